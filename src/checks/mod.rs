pub mod tour_check;
