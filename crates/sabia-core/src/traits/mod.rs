//! Collaborator traits: the seams between the engine and the outside world.

pub mod handler;
pub mod lookup;
pub mod normalizer;
pub mod render;
pub mod speech;
pub mod transport;

pub use handler::MessageHandler;
pub use lookup::{ContentExtractor, Lookup};
pub use normalizer::Normalizer;
pub use render::WordCloudRenderer;
pub use speech::SpeechProducer;
pub use transport::Transport;
