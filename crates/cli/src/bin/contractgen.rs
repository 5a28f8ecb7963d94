use anyhow::Result;

fn main() -> Result<()> {
    contractgen_cli::main_entry()
}
