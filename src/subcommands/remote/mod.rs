//! Subcommands that talk to GitHub through `gh`.

mod prget;
pub use prget::PrgetCmd;

mod prignore;
pub use prignore::PrignoreCmd;

mod prrefresh;
pub use prrefresh::PrrefreshCmd;

mod prsync;
pub use prsync::PrsyncCmd;

mod submit;
pub use submit::SubmitCmd;
