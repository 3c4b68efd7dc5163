use bambam_maxspeed::{app::MaxspeedApp, error::MaxspeedError};
use clap::Parser;

fn main() -> Result<(), MaxspeedError> {
    env_logger::init();
    let args = MaxspeedApp::parse();
    args.op.run()
}
