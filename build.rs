fn main() {
    // Only the ESP-IDF build needs the sysenv cfgs; host builds skip embuild.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
