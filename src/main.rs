//! # deduplicater CLI
//!
//! ## Usage
//! ```bash
//! deduplicater --index ~/Photos index --dir ~/Photos
//! deduplicater --index ~/Photos find --move-to /tmp/dupes
//! deduplicater --index ~/Photos --image-hash find --output json
//! ```

mod cli;

use deduplicater::Result;

fn main() -> Result<()> {
    cli::run()
}
