mod consumer_group;
mod sign_listener;
