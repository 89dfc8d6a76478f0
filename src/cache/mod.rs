pub mod signed_token;
