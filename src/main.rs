fn main() {
    if let Err(err) = semgraph_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
