fn main() {
    if let Err(e) = macclip_lib::run() {
        eprintln!("macclip: {e:#}");
        std::process::exit(1);
    }
}
