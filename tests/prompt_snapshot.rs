use llm_locale_sync::Message;
use llm_locale_sync::sync::build_translation_prompt;

#[test]
fn batch_prompt_snapshot() {
    let title = Message::new("checkout.title", "Checkout");
    let items = Message::new("cart.items", "{count} items in your cart");
    let welcome = Message::new("home.welcome", "Welcome back, {name}!");

    let prompt = build_translation_prompt(&[&title, &items, &welcome], "pidgin");
    insta::assert_snapshot!("pidgin_batch_prompt", prompt.trim_end());
}
