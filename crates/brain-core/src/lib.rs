mod ingest;
mod store;
mod types;
mod walker;
mod watch;

pub use ingest::{ingest_corpus, Ingestor};
pub use store::{load_model, save_model, ModelStore};
pub use types::*;
pub use walker::CorpusWalker;
pub use watch::SourceWatcher;
