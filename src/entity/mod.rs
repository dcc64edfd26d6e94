pub mod buildings;
pub mod cluster_nodes;
pub mod sensor_data;
pub mod sensor_nodes;
