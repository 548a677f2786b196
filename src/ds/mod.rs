pub mod min_heap;
pub mod order_list;
pub mod xorshift;

pub use min_heap::MinHeap;
pub use order_list::OrderList;
pub use xorshift::XorShift64;
