pub mod chunker;
pub mod parser;

pub use chunker::{Chunk, TextChunker};
pub use parser::{DocumentParser, PageText, ParsedDocument};
