mod dump;
mod run;

pub use dump::DumpCmd;
pub use run::RunCmd;
