pub mod scripted_publisher;
