pub mod distance_vector;
pub mod neighbour;
pub mod packet;
pub mod route;
