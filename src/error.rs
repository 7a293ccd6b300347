use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the game.  Only terminal failures are fatal; peer and
/// high-score errors are logged by their callers and play continues.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] io::Error),

    #[error("could not spawn worker '{name}': {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("could not open peer socket on {addr}: {source}")]
    PeerSocket {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("could not send '{token}' to peer {addr}: {source}")]
    PeerSend {
        token: String,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("unknown peer token '{0}'")]
    UnknownToken(String),

    #[error("high score file {path}: {source}")]
    HighScore {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
