use md5::{Digest, Md5};

/// 存储副本的校验和，小写十六进制
pub fn calculate_md5(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_of_known_input() {
        assert_eq!(calculate_md5(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(calculate_md5(b"bp 0 120\n").len(), 32);
    }
}
