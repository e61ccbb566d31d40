#![allow(unused_imports)]

use odra::prelude::*;

use nova_cdp::manager::CdpManager;

fn main() {
    let schema = CdpManager::module_schema();

    println!("{}", schema.as_json().expect("Failed to generate schema"));
}
