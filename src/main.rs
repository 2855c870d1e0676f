fn main() {
    if let Err(err) = table_repair::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
