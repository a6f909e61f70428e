//! Pairing of metadata and data elements within a response message.

use pslookup_core::namespace::NMWG;
use pslookup_core::Element;

/// A metadata element and one data element that references it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataDataPair<'a> {
    /// The metadata element
    pub metadata: &'a Element,
    /// A data element whose `metadataIdRef` names the metadata
    pub data: &'a Element,
    /// The enclosing message's `type`, empty if absent
    pub message_kind: &'a str,
}

impl MetadataDataPair<'_> {
    /// Text of the metadata's `eventType`, if present
    #[must_use]
    pub fn event_type(&self) -> Option<String> {
        self.metadata
            .child("eventType", NMWG)
            .map(Element::text_trim)
    }
}

/// Pair every identified metadata of `message` with the data that reference
/// it.
///
/// Pairs come out metadata-major in document order. Metadata without an `id`
/// and data without a matching metadata are skipped.
pub fn correlate<'a>(message: &'a Element) -> impl Iterator<Item = MetadataDataPair<'a>> + 'a {
    let message_kind = message.attr("type").unwrap_or_default();

    message
        .children_named("metadata", NMWG)
        .filter_map(|metadata| metadata.attr("id").map(|id| (metadata, id)))
        .flat_map(move |(metadata, id)| {
            message
                .children_named("data", NMWG)
                .filter(move |data| data.attr("metadataIdRef") == Some(id))
                .map(move |data| MetadataDataPair {
                    metadata,
                    data,
                    message_kind,
                })
        })
}
