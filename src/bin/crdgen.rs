//! # CRD Generator
//!
//! Prints the `PassboltSecret` CustomResourceDefinition serving `v1alpha1`, `v1alpha2`,
//! `v1alpha3` and `v1`, with `v1` as the storage version.
//!
//! ## Usage
//!
//! ```bash
//! # Generate CRD YAML
//! cargo run --bin crdgen > config/crd/passboltsecret.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```
//!
//! The conversion webhook (`spec.conversion`) is patched in at deploy time, since it
//! needs the service name and CA bundle of the installation.

use passbolt_secret_controller::crd::merged_crd;

fn main() {
    let crd = match merged_crd() {
        Ok(crd) => crd,
        Err(e) => {
            eprintln!("Failed to merge CRD versions: {e}");
            std::process::exit(1);
        }
    };

    match serde_yaml::to_string(&crd) {
        Ok(yaml) => {
            println!("# This file is auto-generated by crdgen");
            println!("# DO NOT EDIT THIS FILE MANUALLY");
            println!("# Fix schema issues in the Rust types under src/crd/");
            println!("#");
            println!("---");
            print!("{yaml}");
        }
        Err(e) => {
            eprintln!("Failed to serialize CRD to YAML: {e}");
            std::process::exit(1);
        }
    }
}
