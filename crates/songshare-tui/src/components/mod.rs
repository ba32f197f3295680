pub mod add_song;
pub mod header;
pub mod log_panel;
pub mod sign_in;
pub mod song_list;
