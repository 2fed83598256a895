//! Prints the Downscaler CRD manifest as YAML.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crd/downscaler.yaml`

use crds::Downscaler;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crd = Downscaler::crd();
    print!("{}", serde_yaml::to_string(&crd)?);
    Ok(())
}
