use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 签名 cookie 的前缀
const SIGNED_PREFIX: &str = "s:";

/// `value.<base64(hmac-sha256)>`，base64 不带填充
pub fn sign(value: &str, secret: &str) -> String {
    let mut mac = mac_for(secret);
    mac.update(value.as_bytes());
    let signature = STANDARD_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{value}.{signature}")
}

/// 校验签名，成功时返回原始值
pub fn unsign(signed: &str, secret: &str) -> Option<String> {
    let (value, signature) = signed.rsplit_once('.')?;
    let signature = STANDARD_NO_PAD.decode(signature).ok()?;

    let mut mac = mac_for(secret);
    mac.update(value.as_bytes());
    mac.verify_slice(&signature).ok()?;

    Some(value.to_string())
}

/// 生成 cookie 值：`s:` + 签名后的会话 ID
pub fn encode_session_id(session_id: &str, secret: &str) -> String {
    format!("{SIGNED_PREFIX}{}", sign(session_id, secret))
}

/// 从 cookie 值中取出会话 ID，未签名或签名不匹配时返回 None
pub fn decode_session_id(cookie_value: &str, secret: &str) -> Option<String> {
    let signed = cookie_value.strip_prefix(SIGNED_PREFIX)?;
    unsign(signed, secret)
}

fn mac_for(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size")
}
