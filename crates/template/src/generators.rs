use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use fake::faker::internet::en::{DomainSuffix, IPv4, IPv6, MACAddress, Password, SafeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::Rng;
use std::collections::HashMap;
use uuid::Uuid;

pub type GeneratorArgs = HashMap<String, String>;
pub type GeneratorFn = Box<dyn Fn(&GeneratorArgs) -> String + Send + Sync>;

fn arg_or<'a>(args: &'a GeneratorArgs, key: &str, default: &'a str) -> &'a str {
    match args.get(key) {
        Some(v) if !v.is_empty() => v,
        _ => default,
    }
}

/// Fixed catalog of named random-value generators. Built once at startup and
/// injected into the template resolver; mutable only through `register`.
pub struct GeneratorRegistry {
    generators: HashMap<String, GeneratorFn>,
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl GeneratorRegistry {
    pub fn empty() -> Self {
        Self {
            generators: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, generator: GeneratorFn) {
        self.generators.insert(name.into(), generator);
    }

    pub fn get(&self, name: &str) -> Option<&GeneratorFn> {
        self.generators.get(name)
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();

        // Identifiers / security
        registry.register("random.UUID", Box::new(|_| Uuid::new_v4().to_string()));
        registry.register(
            "random.UUIDDigit",
            Box::new(|_| Uuid::new_v4().simple().to_string()),
        );
        registry.register("random.JWT", Box::new(|_| unsigned_jwt()));

        // Person
        registry.register("random.Name", Box::new(|_| Name().fake::<String>()));
        registry.register(
            "random.FirstName",
            Box::new(|_| FirstName().fake::<String>()),
        );
        registry.register("random.LastName", Box::new(|_| LastName().fake::<String>()));

        // Contact
        registry.register("random.Email", Box::new(|_| SafeEmail().fake::<String>()));
        registry.register("random.Phone", Box::new(|_| PhoneNumber().fake::<String>()));
        registry.register("random.E164Phone", Box::new(|_| e164_phone()));

        // Internet
        registry.register("random.Username", Box::new(|_| Username().fake::<String>()));
        registry.register(
            "random.URL",
            Box::new(|_| format!("https://{}/{}", domain_name(), Word().fake::<String>())),
        );
        registry.register("random.DomainName", Box::new(|_| domain_name()));
        registry.register("random.IPv4", Box::new(|_| IPv4().fake::<String>()));
        registry.register("random.IPv6", Box::new(|_| IPv6().fake::<String>()));
        registry.register(
            "random.MacAddress",
            Box::new(|_| MACAddress().fake::<String>()),
        );

        // Text
        registry.register("random.Word", Box::new(|_| Word().fake::<String>()));
        registry.register(
            "random.Sentence",
            Box::new(|_| Sentence(1..10).fake::<String>()),
        );
        registry.register(
            "random.Paragraph",
            Box::new(|_| Paragraph(1..3).fake::<String>()),
        );

        // Password, optional length arg
        registry.register(
            "random.Password",
            Box::new(|args| {
                let length = args
                    .get("length")
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(12)
                    .max(4);
                Password(length..length + 1).fake::<String>()
            }),
        );

        // Ranged date with optional format/startDate/endDate
        registry.register("random.Date", Box::new(random_date));

        registry
    }
}

fn domain_name() -> String {
    format!(
        "{}.{}",
        Word().fake::<String>().to_lowercase(),
        DomainSuffix().fake::<String>()
    )
}

fn e164_phone() -> String {
    let mut rng = rand::thread_rng();
    let mut digits = String::new();
    for _ in 0..10 {
        digits.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    format!("+{}{}", rng.gen_range(1..10u8), digits)
}

/// Structurally valid, unverifiable token: header and payload are real JSON,
/// the signature is random bytes.
fn unsigned_jwt() -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = format!(
        r#"{{"sub":"{}","iat":{}}}"#,
        Uuid::new_v4(),
        Utc::now().timestamp()
    );
    let payload = URL_SAFE_NO_PAD.encode(claims.as_bytes());
    let signature_bytes: [u8; 32] = rand::thread_rng().gen();
    let signature = URL_SAFE_NO_PAD.encode(signature_bytes);
    format!("{}.{}.{}", header, payload, signature)
}

/// Translates a Go reference-time layout ("2006-01-02 15:04:05") into a
/// strftime format string. Unknown characters pass through literally; percent
/// signs are escaped so the result is always formattable.
fn go_layout_to_strftime(layout: &str) -> String {
    const TOKENS: &[(&str, &str)] = &[
        ("2006", "%Y"),
        ("01", "%m"),
        ("02", "%d"),
        ("15", "%H"),
        ("03", "%I"),
        ("04", "%M"),
        ("05", "%S"),
        ("PM", "%p"),
    ];

    let mut out = String::new();
    let mut rest = layout;
    'outer: while !rest.is_empty() {
        for (token, fmt) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(fmt);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        match chars.next() {
            Some('%') => out.push_str("%%"),
            Some(ch) => out.push(ch),
            None => break,
        }
        rest = chars.as_str();
    }
    out
}

fn random_date(args: &GeneratorArgs) -> String {
    let format = go_layout_to_strftime(arg_or(args, "format", "2006-01-02"));

    let start = NaiveDate::parse_from_str(arg_or(args, "startDate", "1970-01-01"), "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN));
    let start = Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN));

    let end = match NaiveDate::parse_from_str(arg_or(args, "endDate", ""), "%Y-%m-%d") {
        Ok(date) => {
            let end = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
            // Inverted bounds fall back to now, as do unparseable ones.
            if end < start {
                Utc::now()
            } else {
                end
            }
        }
        Err(_) => Utc::now(),
    };

    let span = (end - start).num_seconds();
    if span <= 0 {
        return start.format(&format).to_string();
    }
    let offset = rand::thread_rng().gen_range(0..=span);
    (start + Duration::seconds(offset)).format(&format).to_string()
}
