mod shortest_path;
mod state;

pub(crate) use shortest_path::shortest_path;
