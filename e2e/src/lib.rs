//! End-to-end translation scenarios against mocked upstream services.

#[cfg(test)]
mod tests;
