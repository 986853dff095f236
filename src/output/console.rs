//! Console printing helpers.

/// Print the startup banner.
pub fn print_banner() {
    println!("mediagrab - media extraction and download engine");
    println!();
}

pub fn print_info(message: &str) {
    println!("[*] {message}");
}

pub fn print_warning(message: &str) {
    eprintln!("[!] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[x] {message}");
}
