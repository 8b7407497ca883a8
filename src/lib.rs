// Library root
// -----------
// The binary (`main.rs`) only parses arguments and wires these modules
// together; every step of a run lives in the library so it can be tested
// without a terminal or a network.
//
// Module responsibilities:
// - `config`: typed settings loaded and validated from `config.json`.
// - `used`: the append-only record of memes that were already posted.
// - `selector`: lists unused files and draws the random batch.
// - `api`: the Imgur client and the `ImageHost` seam.
// - `publisher`: uploads a batch and bundles it into one album.
// - `workflow`: orders the steps so the used-set only changes after an
//   album exists.
// - `ui`: progress bar, result printing and the `authorize` prompt.
pub mod api;
pub mod config;
pub mod errors;
pub mod publisher;
pub mod selector;
pub mod ui;
pub mod used;
pub mod workflow;

pub use errors::{MemeError, MemeResult};
