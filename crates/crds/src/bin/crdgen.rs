//! Prints the DoclingServe CRD manifest as YAML.
//!
//! ```sh
//! cargo run -p crds --bin crdgen > config/crd/doclingserves.yaml
//! ```

use crds::DoclingServe;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crd = DoclingServe::crd();
    print!("{}", serde_yaml::to_string(&crd)?);
    Ok(())
}
