use super::Cents;

const ONES: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const CRORE: u64 = 1_00_00_000;
const LAKH: u64 = 1_00_000;
const THOUSAND: u64 = 1_000;
const HUNDRED: u64 = 100;

/// Spell out an amount in English using the Indian scale (crore, lakh, thousand).
///
/// ```
/// use khata::domain::amount_in_words;
/// assert_eq!(amount_in_words(0), "Zero Rupees Only");
/// assert_eq!(amount_in_words(15050), "One Hundred Fifty Rupees and Fifty Paise Only");
/// ```
///
/// Negative amounts are spelled by magnitude; invoices never carry them.
pub fn amount_in_words(cents: Cents) -> String {
    let abs = cents.unsigned_abs();
    let rupees = abs / 100;
    let paise = abs % 100;

    if rupees == 0 && paise == 0 {
        return "Zero Rupees Only".to_string();
    }

    let rupee_words = if rupees == 0 {
        "Zero".to_string()
    } else {
        spell(rupees)
    };

    if paise == 0 {
        format!("{} Rupees Only", rupee_words)
    } else {
        format!("{} Rupees and {} Paise Only", rupee_words, spell(paise))
    }
}

/// Spell a positive integer. The crore prefix is itself spelled recursively,
/// so amounts beyond 99 crore still read naturally ("Nine Hundred Ninety Nine Crore").
fn spell(n: u64) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut rest = n;

    if rest >= CRORE {
        parts.push(format!("{} Crore", spell(rest / CRORE)));
        rest %= CRORE;
    }
    if rest >= LAKH {
        parts.push(format!("{} Lakh", below_hundred(rest / LAKH)));
        rest %= LAKH;
    }
    if rest >= THOUSAND {
        parts.push(format!("{} Thousand", below_hundred(rest / THOUSAND)));
        rest %= THOUSAND;
    }
    if rest >= HUNDRED {
        parts.push(format!("{} Hundred", ONES[(rest / HUNDRED) as usize]));
        rest %= HUNDRED;
    }
    if rest > 0 {
        parts.push(below_hundred(rest));
    }

    parts.join(" ")
}

fn below_hundred(n: u64) -> String {
    debug_assert!(n < 100);
    if n < 20 {
        return ONES[n as usize].to_string();
    }
    let tens = TENS[(n / 10) as usize];
    match n % 10 {
        0 => tens.to_string(),
        ones => format!("{} {}", tens, ONES[ones as usize]),
    }
}
