pub mod invoice_gateway_client;
