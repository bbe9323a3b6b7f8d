use zkmat::cfg::{
    clap::{self, Parser, Subcommand},
    ZkmatCfg, ZkmatOpt,
};
use zkmat::driver::fixtures;
use zkmat::r1cs::export::{export, ExportDoc};
use zkmat::r1cs::file::{read_r1cs_file, read_witness_file};

use log::info;

use std::convert::TryFrom;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "zkmat", about = "Matrix circuit oracle and R1CS exporter")]
struct Options {
    #[command(subcommand)]
    action: Action,
    #[command(flatten)]
    zkmat: ZkmatOpt,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Reindex a compiled circuit and its witness into a JSON document
    Export {
        /// The `.r1cs` file
        #[arg(long)]
        r1cs: PathBuf,
        /// The witness: `.wtns`, or a `.json` array of decimal strings
        #[arg(long)]
        wtns: PathBuf,
        /// Where to write the document
        #[arg(long, default_value = "data.json")]
        out: PathBuf,
    },
    /// Check an exported document's witness against its constraints
    Check {
        #[arg(long, default_value = "data.json")]
        doc: PathBuf,
    },
    /// Print the oracle's outputs for the standard fixtures
    Oracle,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .format_level(false)
        .format_timestamp(None)
        .init();
    let opts = Options::parse();
    let cfg = ZkmatCfg::try_from(opts.zkmat)?;
    match opts.action {
        Action::Export { r1cs, wtns, out } => {
            let r1cs = read_r1cs_file(r1cs)?;
            let witness = read_witness_file(wtns, r1cs.field())?;
            if cfg.export.check {
                r1cs.check_witness(&witness)?;
                info!("Witness satisfies all {} constraints", r1cs.num_constraints());
            }
            let doc = export(&r1cs, &witness, cfg.layout_mode())?;
            doc.write_json(&out, cfg.export.pretty)?;
            println!(
                "Wrote {} constraints over {} variables to {}",
                doc.n_constraints,
                doc.n_vars,
                out.display()
            );
        }
        Action::Check { doc } => {
            ExportDoc::read_json(&doc)?.check(cfg.field())?;
            println!("{}: ok", doc.display());
        }
        Action::Oracle => {
            for case in fixtures() {
                let out = case.expected()?;
                println!("{} ({}): {:?}", case.name, case.op, out);
            }
        }
    }
    Ok(())
}
