pub mod shared {
    pub mod core {
        pub mod domain_event;
        pub mod typed_id;
    }
    pub mod infrastructure {
        pub mod database;
        pub mod event_bus;
        pub mod outbox;
    }
}

pub mod modules {
    pub mod clients {
        pub mod core {
            pub mod client;
            pub mod events;
            pub mod ports;
        }
        pub mod use_cases {
            pub mod application_error;
            pub mod client_view;
            pub mod register_client {
                pub mod command;
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod change_client_email {
                pub mod command;
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod get_client_by_id {
                pub mod handler;
                pub mod query;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod get_client_by_email {
                pub mod handler;
                pub mod query;
                pub mod inbound {
                    pub mod http;
                }
            }
        }
        pub mod adapters {
            pub mod inbound {
                pub mod event_handlers;
            }
            pub mod outbound {
                pub mod client_outbox;
                pub mod client_repository;
                pub mod client_repository_in_memory;
            }
        }
    }
    pub mod products {
        pub mod core {
            pub mod events;
            pub mod ports;
            pub mod product;
        }
        pub mod use_cases {
            pub mod application_error;
            pub mod create_product {
                pub mod command;
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
        }
        pub mod adapters {
            pub mod inbound {
                pub mod event_handlers;
            }
            pub mod outbound {
                pub mod product_outbox;
                pub mod product_repository;
                pub mod product_repository_in_memory;
            }
        }
    }
}

pub mod shell;
