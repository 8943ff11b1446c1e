pub mod error;
pub mod flit;
pub mod net;
pub mod pe;
pub mod queue;
pub mod router;
pub mod sim;
pub mod topo;

#[cfg(test)]
mod test;
