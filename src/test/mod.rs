mod checkpoint;
mod mesh_integration;
mod router;
mod simulator;
mod sink;
