//! Fraktionale Positionsschlüssel für Geschwister-Reihenfolgen.
//!
//! Schlüssel sind Base-62-Ziffernfolgen (`0-9A-Za-z`), deren ASCII-Ordnung
//! der Ziffernordnung entspricht. Zwischen zwei Schlüsseln lässt sich immer
//! ein weiterer erzeugen, ohne Geschwister umzunummerieren.

const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const BASE: usize = 62;

fn digit_value(byte: u8) -> Option<usize> {
    DIGITS.iter().position(|d| *d == byte)
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.bytes().all(|b| digit_value(b).is_some())
        && !key.ends_with(DIGITS[0] as char)
}

/// Schlüssel strikt zwischen `a` und `b` (beide optional).
///
/// Ungültige Eingaben (leere Schlüssel, fremde Zeichen, abschließende `0`,
/// `a >= b`) werden ignoriert, als fehlten sie; das Ergebnis ist dann
/// mindestens relativ zum verbleibenden gültigen Schlüssel korrekt.
pub fn key_between(a: Option<&str>, b: Option<&str>) -> String {
    let mut a = a.filter(|k| is_valid_key(k));
    let b = b.filter(|k| is_valid_key(k));
    if let (Some(lo), Some(hi)) = (a, b) {
        if lo >= hi {
            log::debug!("key_between: '{}' >= '{}', untere Grenze verworfen", lo, hi);
            a = None;
        }
    }
    midpoint(a.unwrap_or(""), b)
}

/// `count` aufsteigende Schlüssel nach `a`, z.B. für Massen-Einfügungen.
pub fn keys_after(a: Option<&str>, count: usize) -> Vec<String> {
    let mut keys = Vec::with_capacity(count);
    let mut last = a.map(str::to_string);
    for _ in 0..count {
        let next = key_between(last.as_deref(), None);
        keys.push(next.clone());
        last = Some(next);
    }
    keys
}

/// Mittelpunkt zweier Ziffernfolgen; `a` darf leer sein, `b` fehlt = +∞.
fn midpoint(a: &str, b: Option<&str>) -> String {
    let a = a.as_bytes();
    if let Some(b) = b {
        let b = b.as_bytes();
        // Gemeinsames Präfix (a mit '0' aufgefüllt) übernehmen
        let mut n = 0;
        while n < b.len() && a.get(n).copied().unwrap_or(DIGITS[0]) == b[n] {
            n += 1;
        }
        if n > 0 {
            let prefix = String::from_utf8_lossy(&b[..n]).into_owned();
            let rest_a = if n < a.len() { &a[n..] } else { &[][..] };
            let rest_a = String::from_utf8_lossy(rest_a);
            let rest_b = String::from_utf8_lossy(&b[n..]);
            return prefix + &midpoint(&rest_a, Some(&rest_b));
        }
    }

    let digit_a = a.first().and_then(|d| digit_value(*d)).unwrap_or(0);
    let digit_b = b
        .and_then(|b| b.as_bytes().first().copied())
        .and_then(digit_value)
        .unwrap_or(BASE);

    if digit_b - digit_a > 1 {
        let mid = (digit_a + digit_b + 1) / 2;
        return (DIGITS[mid] as char).to_string();
    }

    // Benachbarte Ziffern
    match b {
        Some(b) if b.len() > 1 => b[..1].to_string(),
        _ => {
            let rest_a = if a.len() > 1 { &a[1..] } else { &[][..] };
            let rest_a = String::from_utf8_lossy(rest_a);
            (DIGITS[digit_a] as char).to_string() + &midpoint(&rest_a, None)
        }
    }
}
