//! Version command

/// Run the version command.
pub fn run() {
    println!("tasklaunch {}", env!("CARGO_PKG_VERSION"));
}
