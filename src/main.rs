//! Merge a Hangul font and a Latin coding font into one fixed-width font.

use hangeul_merge::core;

fn main() {
    let cli_args = core::platform::get_cli_args();
    match core::run_app(cli_args) {
        Ok(()) => {}
        Err(error) => core::platform::handle_error(error),
    }
}
