#![allow(dead_code)]

use atoms_core::{ContainerId, Quantity, Unit};
use atoms_matter::{Container, ContainerArena, Matter, Phase};

pub fn water(ul: f64) -> Matter {
    Matter::new(
        "H2O",
        Phase::Liquid,
        Quantity::new(ul / 1000.0, Unit::Gram),
        Quantity::new(ul, Unit::Microliter),
    )
    .unwrap()
}

pub fn vial(label: &str, max_ul: f64, contents: Vec<Matter>) -> Container {
    Container::new(
        label,
        Quantity::new(max_ul, Unit::Microliter),
        Quantity::new(80.0, Unit::Celsius),
        Quantity::new(4.0, Unit::Celsius),
    )
    .unwrap()
    .with_contents(contents)
    .unwrap()
}

/// Vial A (300 uL, 80 degC) holding 200 uL water and an empty 300 uL vial B.
pub fn bench_pair() -> (ContainerArena, ContainerId, ContainerId) {
    let mut arena = ContainerArena::new();
    let a = arena.insert(vial("A", 300.0, vec![water(200.0)])).unwrap();
    let b = arena.insert(vial("B", 300.0, Vec::new())).unwrap();
    (arena, a, b)
}

pub fn ul(value: f64) -> Quantity {
    Quantity::new(value, Unit::Microliter)
}

pub fn celsius(value: f64) -> Quantity {
    Quantity::new(value, Unit::Celsius)
}
