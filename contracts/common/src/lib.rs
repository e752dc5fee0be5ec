#![no_std]

#[cfg(test)]
extern crate std;

pub mod membership;
pub mod text;
pub mod timefmt;
