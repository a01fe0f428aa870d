use anyhow::Result;
use std::io::{self, Write};

use listset::args::Command;
use listset::tabular::SAMPLE_TEMPLATE;

#[tokio::main]
async fn main() -> Result<()> {
    let args = listset::args::parsed();

    match args.command {
        Command::Serve(config) => {
            listset::logging::init(config.debug);
            listset::server::serve(&config).await
        }
        Command::Compare { file } => {
            listset::logging::init(false);
            let comparison = listset::compare_file(&file)?;
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &comparison)?;
            writeln!(stdout)?;
            Ok(())
        }
        Command::Template => {
            io::stdout().lock().write_all(SAMPLE_TEMPLATE.as_bytes())?;
            Ok(())
        }
    }
}
