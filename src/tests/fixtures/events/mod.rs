pub mod sample_event;
