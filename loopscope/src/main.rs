//! Main binary entry point for the `loopscope` loop analyzer.
//!
//! This binary simply delegates to the shared `entry_point::run_with_args()` function
//! so that it behaves exactly like the `loopscope` binary of `loopscope-cli`.

use anyhow::Result;

fn main() -> Result<()> {
    let code = loopscope::entry_point::run_with_args(std::env::args().skip(1).collect())?;
    std::process::exit(code);
}
