mod connectivity;
mod loops;

pub use connectivity::group_overlapping;
pub use loops::{
    border_loop_from_edge_index, border_loops_from_edges, indices_sharing_border_loop,
    outer_and_inner_edges, vert_order_on_edge_row, EdgeRowSplit,
};
