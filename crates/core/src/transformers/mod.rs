//! Built-in transformers.
//!
//! [`default_set`] lists them in canonical priority order. Hosts that need a
//! different mix can build their own [`TransformerSet`] from these rules.

mod block;
mod inline;
pub(crate) mod scan;

pub use block::{CodeBlock, Heading, HorizontalRule, List, ListItem, Paragraph, Quote};
pub use inline::{Delimited, InlineCode, Link};

use crate::transformer::{Transformer, TransformerSet};

/// Every built-in rule in canonical priority order.
pub fn default_set() -> TransformerSet {
    TransformerSet::new()
        .with(Transformer::block(CodeBlock))
        .with(Transformer::block(Heading))
        .with(Transformer::block(HorizontalRule))
        .with(Transformer::block(Quote))
        .with(Transformer::block(List))
        .with(Transformer::block(ListItem))
        .with(Transformer::block(Paragraph))
        .with(Transformer::inline(InlineCode))
        .with(Transformer::inline(Link))
        .with(Transformer::inline(Delimited::strong()))
        .with(Transformer::inline(Delimited::emphasis()))
        .with(Transformer::inline(Delimited::strikethrough()))
}
