/// Display version information
pub fn execute() {
    println!("deposit-follow {}", env!("CARGO_PKG_VERSION"));
    println!("Asset-deposit follow module CLI");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_execute() {
        // Version command should not panic
        execute();
    }
}
