fn main() -> Result<(), Box<dyn std::error::Error>> {
    haream::cli::main()
}
