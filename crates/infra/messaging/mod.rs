pub mod http_event_publisher;
