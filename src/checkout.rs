//! Cart and checkout validation.

use crate::amount::Amount;
use crate::error::{Error, Result};
use crate::model::Customer;
use serde::{Deserialize, Serialize};

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub name: String,
    pub unit_price: Amount,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(name: impl Into<String>, unit_price: Amount, quantity: u32) -> Self {
        Self {
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    pub fn line_total(&self) -> Amount {
        self.unit_price * self.quantity
    }
}

/// Items selected for one order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of an item. Repeated adds of the same name and price bump the quantity.
    pub fn add(&mut self, name: &str, unit_price: Amount) {
        match self
            .lines
            .iter_mut()
            .find(|line| line.name == name && line.unit_price == unit_price)
        {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine::new(name, unit_price, 1)),
        }
    }

    pub fn with_line(mut self, line: CartLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Remove the line at `index`, if present.
    pub fn remove(&mut self, index: usize) -> Option<CartLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.quantity == 0)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of line totals.
    pub fn total(&self) -> Amount {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Items summary stored on the order, e.g. `Tea x2, Samosa x1`.
    pub fn summary(&self) -> String {
        self.lines
            .iter()
            .filter(|line| line.quantity > 0)
            .map(|line| format!("{} x{}", line.name, line.quantity))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Raw contact details as typed at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl CustomerDetails {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Trim and validate the details.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` with a customer-facing message if the name is blank, the
    /// email is present but malformed, or the phone is not exactly 10 digits
    pub fn validate(&self) -> Result<Customer> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Please enter your name.".to_string()));
        }
        let email = self.email.trim();
        if !email.is_empty() && !is_valid_email(email) {
            return Err(Error::InvalidInput(
                "Please enter a valid email address.".to_string(),
            ));
        }
        let phone = self.phone.trim();
        if !is_valid_phone(phone) {
            return Err(Error::InvalidInput(
                "Please enter a 10-digit phone number.".to_string(),
            ));
        }
        Ok(Customer::new(name, phone).with_email(email))
    }
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Exactly 10 ASCII digits.
pub fn is_valid_phone(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_summary_and_total() {
        let mut cart = Cart::new();
        cart.add("Tea", Amount::from_rupees(10));
        cart.add("Samosa", Amount::from_rupees(15));
        cart.add("Tea", Amount::from_rupees(10));

        assert_eq!(cart.summary(), "Tea x2, Samosa x1");
        assert_eq!(cart.total(), Amount::from_rupees(35));
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_cart_remove() {
        let mut cart = Cart::new().with_line(CartLine::new("Dosa", Amount::from_paise(4550), 2));
        assert_eq!(cart.total().to_fixed(), "91.00");
        assert!(cart.remove(3).is_none());
        assert!(cart.remove(0).is_some());
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Amount::ZERO);
    }

    #[test]
    fn test_validate_trims_and_accepts() {
        let customer = CustomerDetails::new("  Asha ", " ", " 9876543210 ")
            .validate()
            .unwrap();
        assert_eq!(customer.name, "Asha");
        assert_eq!(customer.email, None);
        assert_eq!(customer.phone, "9876543210");

        let customer = CustomerDetails::new("Asha", "asha@example.com", "9876543210")
            .validate()
            .unwrap();
        assert_eq!(customer.email.as_deref(), Some("asha@example.com"));
    }

    #[test]
    fn test_validate_rejects() {
        assert!(CustomerDetails::new("", "", "9876543210").validate().is_err());
        assert!(CustomerDetails::new("A", "asha@", "9876543210").validate().is_err());
        assert!(CustomerDetails::new("A", "", "98765").validate().is_err());
        assert!(CustomerDetails::new("A", "", "98765432101").validate().is_err());
        assert!(CustomerDetails::new("A", "", "98765-4321").validate().is_err());
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@b.c"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@.c"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("a@b@c.d"));
        assert!(!is_valid_email("@b.c"));
    }
}
